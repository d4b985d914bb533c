fn main() {
    if let Err(err) = svcmap::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
