use pretty_assertions::assert_eq;
use serde_json::json;
use web2md_core::{AiProvider, ConvertOutput, LogLevel, PipelineEvent, ScrapeOptions, Status};

#[test]
fn options_fill_missing_fields_with_defaults() {
    let options: ScrapeOptions = serde_json::from_value(json!({})).unwrap();
    assert_eq!(options, ScrapeOptions::default());
    assert!(options.include_images);
    assert!(options.include_links);
    assert!(!options.use_browser);
    assert_eq!(options.ai_provider, AiProvider::Gemini);

    let options: ScrapeOptions =
        serde_json::from_value(json!({"includeLinks": false, "aiProvider": "deepseek"})).unwrap();
    assert!(!options.include_links);
    assert!(options.include_images);
    assert_eq!(options.ai_provider, AiProvider::DeepSeek);
}

#[test]
fn unknown_provider_is_rejected() {
    let parsed = serde_json::from_value::<ScrapeOptions>(json!({"aiProvider": "other"}));
    assert!(parsed.is_err());
}

#[test]
fn events_serialize_as_tagged_objects() {
    assert_eq!(
        serde_json::to_value(PipelineEvent::status(Status::Scraping)).unwrap(),
        json!({"type": "status", "status": "SCRAPING"})
    );
    assert_eq!(
        serde_json::to_value(PipelineEvent::info("hello")).unwrap(),
        json!({"type": "log", "level": "info", "message": "hello"})
    );
    assert_eq!(
        serde_json::to_value(PipelineEvent::browser_hint(LogLevel::Warn, "retry")).unwrap(),
        json!({"type": "log", "level": "warn", "message": "retry", "autoEnableBrowser": true})
    );
    assert_eq!(
        serde_json::to_value(PipelineEvent::error("bad")).unwrap(),
        json!({"type": "error", "message": "bad"})
    );
}

#[test]
fn result_event_carries_output() {
    let event = PipelineEvent::Result {
        data: ConvertOutput {
            url: "https://example.com/".to_string(),
            title: "Example".to_string(),
            markdown: "# Example".to_string(),
            html: "<h1>Example</h1>".to_string(),
        },
    };
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], "result");
    assert_eq!(value["data"]["markdown"], "# Example");
    assert!(event.is_terminal());

    let back: PipelineEvent = serde_json::from_value(value).unwrap();
    assert_eq!(back, event);
}
