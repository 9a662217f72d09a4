// mem::transmute is mentioned here only in a comment
fn parse(raw: &str) -> u32 {
    let note = "std::mem::transmute::<u64, i64> in a string literal";
    let _ = note;
    // TODO: handle errors
    raw.parse::<u32>().unwrap()
}
