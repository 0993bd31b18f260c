use shadecache::cli;

fn main() {
    let code = match cli::process_cli() {
        Ok(code) => code,
        Err(e) => {
            log::error!("shadecache failed: {e:#}");
            eprintln!("shadecache: error: {e:#}");
            1
        }
    };
    log::logger().flush();

    // No app state exists beyond this point, so no destructors are skipped.
    std::process::exit(code);
}
