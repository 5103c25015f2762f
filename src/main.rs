fn main() {
    if let Err(e) = carebook_lib::run() {
        eprintln!("carebook: {e}");
        std::process::exit(1);
    }
}
