fn main() {
    #[cfg(feature = "cli")]
    jojodiff::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("jojodiff: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
