fn main() {
    if let Err(err) = fuel_sales_etl::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
