#[cfg(test)]
pub fn init() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

#[cfg(test)]
mod test {
    use super::init;

    #[test]
    fn test_tracing() {
        init();
        tracing::info!("tracing initialized for tests");
        // a second init must not panic
        init();
    }
}
