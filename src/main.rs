fn main() {
    if let Err(code) = sdd::cli::run() {
        std::process::exit(code.as_i32());
    }
}
