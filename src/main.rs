fn main() {
    if let Err(err) = umlgen::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
