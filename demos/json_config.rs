use {
    std::collections::BTreeMap,
    throwler::{create_logger, RawOptions},
};

const CONFIG: &str = r#"{
    "output": "file",
    "timestamp": true,
    "autorotate": "none",
    "dateFormat": "DD-MM-YYYY",
    "dir": "./logs",
    "size": "256K"
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = create_logger(&RawOptions::from_json_str(CONFIG)?)?;

    let mut request = BTreeMap::new();
    request.insert("method", "GET");
    request.insert("path", "/api/users");
    logger.log(&request, Some("info"));
    logger.log("Configuration loaded successfully", None);

    Ok(())
}
