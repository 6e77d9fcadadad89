use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use simple_realtime::{Error, ToolRegistry, ToolSpec};

#[derive(Debug, Deserialize, JsonSchema)]
struct WeatherArgs {
    city: String,
    #[serde(default = "default_units")]
    units: String,
}

fn default_units() -> String {
    "c".to_string()
}

#[derive(Debug, Serialize)]
struct Weather {
    city: String,
    units: String,
    temperature: i32,
}

#[test]
fn typed_registration_derives_required_from_defaults() {
    let mut registry = ToolRegistry::new();
    registry
        .register_typed(
            "get_weather",
            "Current weather for a city.",
            |args: WeatherArgs| async move {
                Ok(Weather {
                    city: args.city,
                    units: args.units,
                    temperature: 21,
                })
            },
        )
        .unwrap();

    let tools = registry.snapshot();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["type"], "function");
    assert_eq!(tools[0]["name"], "get_weather");
    assert_eq!(tools[0]["description"], "Current weather for a city.");

    let schema = &tools[0]["parameters"];
    assert_eq!(schema["required"], json!(["city"]));
    assert_eq!(schema["properties"]["city"]["type"], "string");
    assert_eq!(schema["properties"]["units"]["type"], "string");
}

#[tokio::test]
async fn typed_handler_round_trips_through_json() {
    let mut registry = ToolRegistry::new();
    registry
        .register_typed("get_weather", "", |args: WeatherArgs| async move {
            Ok(Weather {
                city: args.city,
                units: args.units,
                temperature: 21,
            })
        })
        .unwrap();

    let handler = registry.lookup("get_weather").unwrap();
    let out = handler(json!({"city": "Oslo"})).await.unwrap();
    assert_eq!(out["city"], "Oslo");
    assert_eq!(out["units"], "c");
    assert_eq!(out["temperature"], 21);
}

#[tokio::test]
async fn typed_handler_rejects_bad_arguments() {
    let mut registry = ToolRegistry::new();
    registry
        .register_typed("get_weather", "", |args: WeatherArgs| async move {
            Ok(Weather {
                city: args.city,
                units: args.units,
                temperature: 21,
            })
        })
        .unwrap();

    let handler = registry.lookup("get_weather").unwrap();
    let result = handler(json!({"units": "f"})).await;
    assert!(matches!(result, Err(Error::ToolExecution(_))));
}

#[test]
fn explicit_schema_is_passed_through_verbatim() {
    let parameters = json!({
        "type": "object",
        "properties": { "query": { "type": "string" } },
        "required": ["query"],
    });
    let spec = ToolSpec::new("search")
        .description("Full-text search.")
        .parameters(parameters.clone());

    let mut registry = ToolRegistry::new();
    registry
        .register(spec, |args| async move { Ok(args) })
        .unwrap();

    let tools = registry.snapshot();
    assert_eq!(tools[0]["parameters"], parameters);
}
