//! Simple decoder to inspect raw array files.
//!
//! Usage: decode_array <path> <dtype> <shape> [order] [--index]
//!
//! `dtype` is `<f4` or `<i4`, `shape` is comma separated (`4,3`), and
//! `order` is `c` (default) or `f`. `--index` decodes categorical files,
//! mapping NaN back to -1.

use std::fs;

use geoscene::codec::{deserialize_index, deserialize_ordered};
use geoscene::model::ArrayData;
use geoscene::{NdArray, Order, WireDtype};

fn format_array(array: &NdArray) -> String {
    let values: Vec<String> = match array.data() {
        ArrayData::Float(v) => v.iter().take(12).map(|x| format!("{:.6}", x)).collect(),
        ArrayData::Int(v) => v.iter().take(12).map(|x| x.to_string()).collect(),
    };
    let more = if array.numel() > 12 { ", ..." } else { "" };
    format!("[{}{}]", values.join(", "), more)
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let index = args.iter().any(|a| a == "--index");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    if positional.len() < 3 {
        eprintln!("usage: decode_array <path> <dtype> <shape> [order] [--index]");
        std::process::exit(2);
    }

    let path = positional[0];
    let dtype = WireDtype::from_tag(positional[1]).expect("Unknown dtype");
    let shape: Vec<usize> = positional[2]
        .split(',')
        .map(|d| d.trim().parse().expect("Invalid shape"))
        .collect();
    let order = positional
        .get(3)
        .map(|o| Order::from_tag(o).expect("Order must be c or f"))
        .unwrap_or(Order::C);

    println!("Reading: {}", path);
    let data = fs::read(path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let array = if index {
        deserialize_index(&data, &shape).expect("Failed to decode")
    } else {
        deserialize_ordered(&data, &shape, dtype, order).expect("Failed to decode")
    };

    println!("\n=== Array Info ===");
    println!("Dtype: {}", dtype);
    println!("Shape: {:?}", array.shape());
    println!("Order: {}", order.tag());
    println!("Elements: {}", array.numel());

    let values = array.to_f64_vec();
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if !finite.is_empty() {
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!("Min: {}", min);
        println!("Max: {}", max);
        println!("Sum: {}", array.sum());
    }
    let missing = values.len() - finite.len();
    if missing > 0 {
        println!("Non-finite: {}", missing);
    }

    println!("\n=== Values ===");
    println!("{}", format_array(&array));
}
