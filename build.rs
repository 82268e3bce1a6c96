//! Build script for avflow
//!
//! Handles:
//! 1. Locating the FFmpeg installation (headers + libraries)
//! 2. Compiling the C accessor library via `cc`
//! 3. Linking libavformat, libavcodec and libavutil (shared by default, static with `static`)

use std::env;
use std::path::PathBuf;
use std::process::Command;

/// FFmpeg libraries this crate binds, in link order
const FFMPEG_LIBS: [&str; 3] = ["avformat", "avcodec", "avutil"];

fn main() {
  let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
  let link_static = env::var_os("CARGO_FEATURE_STATIC").is_some();

  let install = locate_ffmpeg(&target_os);

  compile_accessors(&install);

  if link_static {
    link_static_ffmpeg(&install);
    link_platform_libraries(&target_os);
  } else {
    link_shared_ffmpeg(&install);
  }

  println!("cargo:rerun-if-changed=src/ffi/accessors.c");
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
  println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");
}

/// Where FFmpeg headers and libraries live
struct FfmpegInstall {
  include_dirs: Vec<PathBuf>,
  lib_dirs: Vec<PathBuf>,
}

/// Resolve the FFmpeg installation
///
/// Order: `FFMPEG_DIR`, then `pkg-config`, then common prefixes.
fn locate_ffmpeg(target_os: &str) -> FfmpegInstall {
  if let Ok(dir) = env::var("FFMPEG_DIR") {
    let prefix = PathBuf::from(dir);
    return FfmpegInstall {
      include_dirs: vec![prefix.join("include")],
      lib_dirs: vec![prefix.join("lib")],
    };
  }

  if let Some(install) = probe_pkg_config() {
    return install;
  }

  let common_paths = match target_os {
    "macos" => vec!["/opt/homebrew", "/usr/local", "/opt/local"],
    "linux" => vec!["/usr", "/usr/local", "/opt/ffmpeg"],
    "windows" => vec!["C:\\ffmpeg", "C:\\Program Files\\ffmpeg"],
    _ => vec![],
  };

  for path in common_paths {
    let p = PathBuf::from(path);
    if p.join("include/libavformat/avformat.h").exists() {
      return FfmpegInstall {
        include_dirs: vec![p.join("include")],
        lib_dirs: vec![p.join("lib")],
      };
    }
  }

  println!(
    "cargo:warning=FFmpeg not found. Set FFMPEG_DIR environment variable or install FFmpeg."
  );
  FfmpegInstall {
    include_dirs: vec![PathBuf::from("/usr/local/include")],
    lib_dirs: vec![PathBuf::from("/usr/local/lib")],
  }
}

/// Ask pkg-config for include and library directories of every bound library
fn probe_pkg_config() -> Option<FfmpegInstall> {
  let mut args = vec!["--cflags-only-I".to_string(), "--libs-only-L".to_string()];
  args.extend(FFMPEG_LIBS.iter().map(|lib| format!("lib{}", lib)));

  let output = Command::new("pkg-config").args(&args).output().ok()?;
  if !output.status.success() {
    return None;
  }

  let flags = String::from_utf8_lossy(&output.stdout);
  let mut install = FfmpegInstall {
    include_dirs: Vec::new(),
    lib_dirs: Vec::new(),
  };

  for flag in flags.split_whitespace() {
    if let Some(dir) = flag.strip_prefix("-I") {
      install.include_dirs.push(PathBuf::from(dir));
    } else if let Some(dir) = flag.strip_prefix("-L") {
      install.lib_dirs.push(PathBuf::from(dir));
    }
  }

  Some(install)
}

/// Compile the C accessor library
fn compile_accessors(install: &FfmpegInstall) {
  let mut build = cc::Build::new();
  build.file("src/ffi/accessors.c").warnings(true);

  for dir in &install.include_dirs {
    build.include(dir);
  }

  #[cfg(target_os = "macos")]
  {
    build.flag("-Wno-deprecated-declarations");
  }

  build.compile("ffmpeg_accessors");
}

/// Link FFmpeg as shared libraries
fn link_shared_ffmpeg(install: &FfmpegInstall) {
  for dir in &install.lib_dirs {
    println!("cargo:rustc-link-search=native={}", dir.display());
  }
  for lib in &FFMPEG_LIBS {
    println!("cargo:rustc-link-lib={}", lib);
  }
}

/// Link FFmpeg statically using full paths to .a files
fn link_static_ffmpeg(install: &FfmpegInstall) {
  for lib in &FFMPEG_LIBS {
    match find_static_lib_path(lib, &install.lib_dirs) {
      // Use link-arg to specify full path - this forces static linking
      Some(path) => println!("cargo:rustc-link-arg={}", path.display()),
      None => panic!(
        "Static library lib{}.a not found in {:?}. \
         Install FFmpeg with static libraries or set FFMPEG_DIR.",
        lib, install.lib_dirs
      ),
    }
  }

  // Codec libraries FFmpeg may have been configured with; skipped if absent
  let codec_libs = [
    "x264", "x265", "vpx", "aom", "dav1d", "mp3lame", "opus", "vorbisenc", "vorbis", "ogg",
  ];
  let mut search = install.lib_dirs.clone();
  if let Ok(lib_path) = env::var("LIBRARY_PATH") {
    search.extend(lib_path.split(':').map(PathBuf::from));
  }

  for lib in &codec_libs {
    if let Some(path) = find_static_lib_path(lib, &search) {
      println!("cargo:rustc-link-arg={}", path.display());
    }
  }
}

/// Find static library path if it exists
fn find_static_lib_path(name: &str, paths: &[PathBuf]) -> Option<PathBuf> {
  let static_name = format!("lib{}.a", name);
  paths
    .iter()
    .map(|path| path.join(&static_name))
    .find(|full_path| full_path.exists())
}

/// Link platform-specific system libraries needed by a static FFmpeg
fn link_platform_libraries(target_os: &str) {
  match target_os {
    "macos" => {
      let frameworks = [
        "VideoToolbox",
        "CoreMedia",
        "CoreVideo",
        "CoreFoundation",
        "Security",
        "AudioToolbox",
      ];
      for framework in &frameworks {
        println!("cargo:rustc-link-lib=framework={}", framework);
      }
      println!("cargo:rustc-link-lib=bz2");
      println!("cargo:rustc-link-lib=iconv");
      println!("cargo:rustc-link-lib=lzma");
    }
    "linux" => {
      println!("cargo:rustc-link-lib=m");
      println!("cargo:rustc-link-lib=pthread");
      println!("cargo:rustc-link-lib=dl");
    }
    "windows" => {
      let libs = ["bcrypt", "ole32", "user32", "ws2_32", "secur32", "advapi32"];
      for lib in &libs {
        println!("cargo:rustc-link-lib={}", lib);
      }
    }
    _ => {
      println!("cargo:warning=Unknown target OS: {}", target_os);
    }
  }
}
