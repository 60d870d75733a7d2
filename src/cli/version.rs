/// Display version information
pub fn execute() {
    println!("yip210 {}", env!("CARGO_PKG_VERSION"));
    println!("Operator CLI for the YIP210 treasury rebalancing proposal");
}
