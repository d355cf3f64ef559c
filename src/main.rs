fn main() {
    if let Err(err) = nodeview::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
