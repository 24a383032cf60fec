use std::path::PathBuf;

#[cfg(unix)]
pub fn mpv_socket_name() -> String {
    format!("{}/tubefm-mpv.sock", std::env::temp_dir().display())
}

#[cfg(windows)]
pub fn mpv_socket_name() -> String {
    "tubefm-mpv".to_string()
}

#[cfg(unix)]
pub fn mpv_socket_arg() -> String {
    format!("--input-ipc-server={}", mpv_socket_name())
}

#[cfg(windows)]
pub fn mpv_socket_arg() -> String {
    format!("--input-ipc-server=\\\\.\\pipe\\{}", mpv_socket_name())
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/tubefm on unix (XDG layout regardless of macOS conventions)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("tubefm")
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubefm")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("tubefm")
    }
    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubefm")
    }
}

/// Default location of the saved-URL file: beside the executable, matching
/// the file the original script kept next to itself.  Falls back to the data
/// dir when the executable path cannot be resolved.
pub fn saved_urls_path() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            return dir.join("saved_urls.json");
        }
    }
    data_dir().join("saved_urls.json")
}

#[cfg(unix)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv"]
}

#[cfg(windows)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv.exe", "mpv"]
}

#[cfg(unix)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp", "yt-dlp_linux", "yt-dlp_macos"]
}

#[cfg(windows)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp.exe", "yt-dlp"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("external").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var("PATH").ok()?;
    #[cfg(unix)]
    let sep = ":";
    #[cfg(windows)]
    let sep = ";";
    for dir in path.split(sep) {
        for name in names {
            let p = PathBuf::from(dir).join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Find the mpv binary: beside the current exe, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    if let Some(p) = find_beside_exe(mpv_binary_names()) {
        return Some(p);
    }
    find_on_path(mpv_binary_names())
}

/// Find the yt-dlp binary.
///
/// Searches in order:
/// 1. YT_DLP_PATH environment variable
/// 2. Beside current executable
/// 3. PATH
pub fn find_yt_dlp_binary() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("YT_DLP_PATH") {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }

    if let Some(p) = find_beside_exe(yt_dlp_binary_names()) {
        return Some(p);
    }

    find_on_path(yt_dlp_binary_names())
}
