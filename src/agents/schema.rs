//! Structured-output schema for report generation, in the OpenAPI subset the
//! generateContent endpoint accepts.

use serde_json::{json, Value};

fn string() -> Value {
    json!({ "type": "STRING" })
}

fn number() -> Value {
    json!({ "type": "NUMBER" })
}

fn one_of(values: &[&str]) -> Value {
    json!({ "type": "STRING", "enum": values })
}

fn object(properties: Value) -> Value {
    json!({ "type": "OBJECT", "properties": properties })
}

fn array_of(properties: Value) -> Value {
    json!({ "type": "ARRAY", "items": object(properties) })
}

pub fn report_schema() -> Value {
    let levels = ["High", "Medium", "Low"];

    object(json!({
        "id": string(),
        "title": string(),
        "type": string(),
        "date": string(),
        "audience": string(),
        "summary": string(),
        "outlook": string(),
        "marketContext": string(),
        "executiveBrief": object(json!({
            "cfoView": string(),
            "croView": string(),
            "cooView": string()
        })),
        "metrics": array_of(json!({
            "label": string(),
            "value": string(),
            "trend": number(),
            "iconType": one_of(&["volume", "trend", "growth", "chart"])
        })),
        "insights": array_of(json!({
            "text": string(),
            "source": string()
        })),
        "risks": array_of(json!({
            "id": string(),
            "description": string(),
            "impact": one_of(&levels),
            "priority": one_of(&["Critical", "Monitor", "Low"])
        })),
        "recommendations": array_of(json!({
            "title": string(),
            "description": string(),
            "impact": one_of(&levels),
            "effort": one_of(&levels)
        })),
        "competitors": array_of(json!({
            "name": string(),
            "marketShare": number(),
            "growth": number(),
            "sentiment": number()
        })),
        "chartData": array_of(json!({
            "name": string(),
            "primary": number(),
            "secondary": number(),
            "amt": number()
        })),
        "tableData": array_of(json!({
            "category": string(),
            "primary": number(),
            "secondary": number(),
            "contribution": number()
        })),
        "scenarios": array_of(json!({
            "id": string(),
            "label": string(),
            "min": number(),
            "max": number(),
            "defaultValue": number(),
            "step": number(),
            "unit": string(),
            "impactFactor": number()
        })),
        "forecastData": array_of(json!({
            "name": string(),
            "value": number(),
            "lowerBound": number(),
            "upperBound": number()
        })),
        "strategicMap": array_of(json!({
            "dim": string(),
            "A": number(),
            "B": number(),
            "fullMark": number()
        }))
    }))
}
