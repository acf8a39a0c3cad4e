// build.rs

fn main() {
    // The GLX provider links against Xlib and libGL. Only Unix targets with
    // an X server need those; Windows and macOS link their GL libraries via
    // the winapi/cgl crates.
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os == "windows" || target_os == "macos" {
        return;
    }

    // Try pkg-config first, which is the standard way to find library
    // linking information on Unix-like systems. If it fails (not installed,
    // or a .pc file is missing), fall back to manual linker flags.
    let libraries = ["x11", "gl"];

    let mut pkg_config_success = true;

    for lib in &libraries {
        let result = pkg_config::probe_library(lib);

        if result.is_err() {
            eprintln!(
                "pkg-config failed for library '{}'. Falling back to manual linking.",
                lib
            );
            pkg_config_success = false;
            break;
        }
    }

    if !pkg_config_success {
        // Manual fallback. Assumes the libraries live in standard paths like
        // /usr/lib or /usr/local/lib; adjust -L or LIBRARY_PATH otherwise.
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-lib=GL");
        println!("cargo:rustc-link-search=/usr/lib");

        eprintln!(
            "Manual linking flags applied. Ensure X11 and OpenGL development libraries are installed."
        );
    } else {
        eprintln!("pkg-config successfully found libraries. Linking configured automatically.");
    }
}
