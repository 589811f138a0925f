use {
    throwler::{create_logger, RawOptions},
    tracing_subscriber::util::SubscriberInitExt,
};

/// Write enough entries into hourly directories to spill over a 1K threshold
/// a few times. Write failures show up on stderr through `tracing`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).finish().try_init()?;

    let logger = create_logger(
        &RawOptions::new()
            .dir("./logs")
            .autorotate("hourly")
            .dir_date_format("YYYY-MM-DD")
            .date_format("YYYY-MM-DDTHH")
            .size("1K")
            .levels(["info", "error"]),
    )?;

    for i in 1..=100 {
        logger.log(
            &format!("Log entry #{i}: This is a sample log message that will contribute to file size"),
            Some(if i % 10 == 0 { "error" } else { "info" }),
        );
    }
    logger.flush();

    Ok(())
}
