/// Optional plain-text log file, enabled with `--log-file <path>`
use super::config::get_logger_config;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};

static LOG_FILE: Lazy<Mutex<Option<BufWriter<File>>>> = Lazy::new(|| Mutex::new(None));

pub fn init_file_logging() {
    let Some(path) = get_logger_config().log_file else {
        return;
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => *LOG_FILE.lock() = Some(BufWriter::new(file)),
        Err(e) => eprintln!("Failed to open log file {}: {}", path.display(), e),
    }
}

pub fn write_to_file(line: &str) {
    if let Some(writer) = LOG_FILE.lock().as_mut() {
        let _ = writeln!(writer, "{}", line);
    }
}

pub fn flush_file_logging() {
    if let Some(writer) = LOG_FILE.lock().as_mut() {
        let _ = writer.flush();
    }
}
