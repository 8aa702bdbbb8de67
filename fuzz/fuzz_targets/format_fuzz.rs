//! Format fuzz target: the first line of the input is a descriptor, the rest is
//! data to unpack with it. Compiling, unpacking and re-packing must not panic.
//! Build with: cargo fuzz run format_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let split = data.iter().position(|b| *b == b'\n').unwrap_or(data.len());
    let descriptor = match std::str::from_utf8(&data[..split]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let codec = match bitstruct::Codec::compile(descriptor) {
        Ok(c) => c,
        Err(_) => return,
    };
    // Keep widths bounded so a huge descriptor does not allocate gigabytes.
    if codec.calcsize() > 1 << 16 {
        return;
    }
    let body = data.get(split + 1..).unwrap_or(&[]);
    if let Ok(values) = codec.unpack(body) {
        let _ = codec.pack(&values);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run format_fuzz");
}
