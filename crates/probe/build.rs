//! Wires up the linker script for bare-metal RISC-V builds of `zba_probe`.

fn main() {
    let target = std::env::var("TARGET").unwrap_or_default();
    if !(target.starts_with("riscv64") && target.ends_with("-none-elf")) {
        return; // hosted target, default linking
    }

    let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let script_path = std::path::Path::new(&manifest_dir).join("link.ld");
    println!("cargo:rustc-link-arg-bins=-T{}", script_path.display());
    println!("cargo:rerun-if-changed={}", script_path.display());
}
