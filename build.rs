use std::env;
use std::path::{Path, PathBuf};

// ffmpeg-sys-next does the actual discovery; this only points at the usual
// places a missing FFmpeg install can be found.
fn main() {
    for variable in ["FFMPEG_DIR", "PKG_CONFIG_PATH", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
        "windows" => hint_vcpkg(),
        "macos" => hint_homebrew(),
        _ => {}
    }
}

fn hint_vcpkg() {
    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=vidkit needs FFmpeg. Install it with vcpkg and set VCPKG_ROOT, or point FFMPEG_DIR at an FFmpeg build."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let install = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if install.exists() {
        println!(
            "cargo:warning=Using the vcpkg FFmpeg at {}; set FFMPEG_DIR to make this explicit.",
            install.display()
        );
    } else {
        println!(
            "cargo:warning=No vcpkg FFmpeg found at {}.",
            install.display()
        );
    }
}

fn hint_homebrew() {
    if env::var_os("PKG_CONFIG_PATH").is_some() {
        return;
    }

    let found = ["/opt/homebrew/opt/ffmpeg", "/usr/local/opt/ffmpeg"]
        .into_iter()
        .map(Path::new)
        .find(|prefix| prefix.exists());
    if let Some(prefix) = found {
        println!(
            "cargo:warning=Homebrew FFmpeg found at {}. If linking fails, set PKG_CONFIG_PATH={}/lib/pkgconfig.",
            prefix.display(),
            prefix.display()
        );
    }
}
