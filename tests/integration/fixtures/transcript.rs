use std::path::{Path, PathBuf};

/// Claude Code session log with `count` alternating user/assistant lines,
/// ids `u1..u{count}`.
pub fn claude_log(count: usize) -> String {
    let mut out = String::from(
        "{\"type\":\"summary\",\"summary\":\"Fix parser\",\"leafUuid\":\"u1\"}\n",
    );
    for i in 1..=count {
        let kind = if i % 2 == 1 { "user" } else { "assistant" };
        out.push_str(&format!(
            "{{\"type\":\"{kind}\",\"uuid\":\"u{i}\",\"message\":{{\"content\":\"message {i}\"}}}}\n"
        ));
    }
    out
}

pub fn write_claude_log(dir: &Path, name: &str, count: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, claude_log(count)).expect("write transcript fixture");
    path
}
