use throwler::{create_logger, RawOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = create_logger(&RawOptions::new().output("console"))?;

    logger.log("This is an info message", Some("info"));
    logger.log(&vec!["a", "b", "c"], Some("debug"));
    logger.log(&std::env::args().collect::<Vec<_>>(), None);

    Ok(())
}
