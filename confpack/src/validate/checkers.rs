//! Built-in file checkers.
//!
//! Checker semantics follow what the supported players actually accept:
//! config and script-option files are line-oriented `key=value` text and
//! get line-numbered findings; plugins and shaders are opaque enough that
//! most findings are file-level.

use std::fs;
use std::path::Path;

use super::{FileChecker, Finding};
use crate::package::PlayerKind;

/// mpv options recognized by the config checker (subset).
const MPV_KNOWN_OPTIONS: &[&str] = &[
    "vo",
    "gpu-api",
    "gpu-context",
    "profile",
    "scale",
    "cscale",
    "dscale",
    "correct-downscaling",
    "sigmoid-upscaling",
    "scale-antiring",
    "cscale-antiring",
    "glsl-shaders",
    "glsl-shaders-toggle",
    "icc-profile-auto",
    "icc-cache",
    "target-colorspace",
    "target-trc",
    "linear-downscaling",
    "linear-scaling",
    "hdr-compute-peak",
    "hdr-peak-decay-rate",
    "tone-mapping",
    "tone-mapping-param",
    "tone-mapping-desaturate",
    "dither",
    "dither-depth",
    "temporal-dither",
    "deband",
    "deband-iterations",
    "deband-threshold",
    "interpolation",
    "tscale",
    "video-sync",
    "blend-subtitles",
    "script-opts",
    "fullscreen",
    "keep-open",
    "border",
    "hwdec",
    "sub-font-provider",
    "sub-fonts-dir",
];

/// VLC options recognized by the config checker (subset).
const VLC_KNOWN_OPTIONS: &[&str] = &[
    "video-output",
    "fullscreen",
    "video-on-top",
    "overlay-video",
    "quiet-synchro",
    "skip-frames",
    "drop-late-frames",
    "use-wallpaper",
    "video-title-timeout",
    "avcodec-hw",
    "swscale-mode",
    "direct3d11-use-hq-chroma",
    "direct3d11-hw-blending",
    "deinterlace",
    "deinterlace-mode",
    "tone-mapping",
    "tone-mapping-param",
    "file-caching",
    "live-caching",
    "disc-caching",
    "network-caching",
    "video-filter",
    "postproc-q",
    "hq-resampling",
    "video-scaling-factor",
    "scale-factor",
    "qt-fullscreen-toggle",
    "qt-minimal-view",
    "qt-video-autoresize",
    "aout",
    "audio-replay-gain-mode",
    "audio-replay-gain-preamp",
    "audio-normalization",
];

/// Shader source extensions accepted by the shader checker.
const SHADER_EXTENSIONS: &[&str] = &["glsl", "frag", "vert", "comp"];

fn read_text(path: &Path) -> Result<String, Finding> {
    fs::read_to_string(path)
        .map_err(|e| Finding::error(format!("failed to read file: {e}")))
}

/// Check whether a line is a well-formed `key=value` option.
///
/// Keys are limited to alphanumerics, `-` and `_`; the value may be empty.
fn parse_option_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some((key, value))
}

fn check_option_syntax(
    content: &str,
    known_options: Option<&[&str]>,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match parse_option_line(trimmed) {
            Some((key, _)) => {
                if let Some(known) = known_options {
                    if !known.contains(&key) {
                        findings.push(Finding::warning_at(
                            line_no,
                            format!("unknown option '{key}'"),
                        ));
                    }
                }
            }
            None => {
                findings.push(Finding::error_at(
                    line_no,
                    format!("invalid syntax: '{trimmed}'"),
                ));
            }
        }
    }

    findings
}

/// Checker for player configuration files (`key=value` syntax).
///
/// Malformed lines are line-numbered errors; well-formed options that are
/// not in the player's known set are line-numbered warnings.
pub struct ConfigChecker;

impl FileChecker for ConfigChecker {
    fn check(&self, path: &Path, player: PlayerKind) -> Vec<Finding> {
        let content = match read_text(path) {
            Ok(c) => c,
            Err(finding) => return vec![finding],
        };

        let known = match player {
            PlayerKind::Mpv => MPV_KNOWN_OPTIONS,
            PlayerKind::Vlc => VLC_KNOWN_OPTIONS,
        };
        check_option_syntax(&content, Some(known))
    }
}

/// Checker for per-script option files.
///
/// Same line syntax as config files, but option names are script-defined
/// so no known-option set applies.
pub struct ScriptOptChecker;

impl FileChecker for ScriptOptChecker {
    fn check(&self, path: &Path, _player: PlayerKind) -> Vec<Finding> {
        let content = match read_text(path) {
            Ok(c) => c,
            Err(finding) => return vec![finding],
        };
        check_option_syntax(&content, None)
    }
}

/// Checker for Lua plugin scripts.
pub struct PluginLuaChecker;

impl FileChecker for PluginLuaChecker {
    fn check(&self, path: &Path, _player: PlayerKind) -> Vec<Finding> {
        let mut findings = Vec::new();

        if path.extension().and_then(|e| e.to_str()) != Some("lua") {
            findings.push(Finding::error("expected a .lua file"));
        }

        let content = match read_text(path) {
            Ok(c) => c,
            Err(finding) => {
                findings.push(finding);
                return findings;
            }
        };

        // Scripts that never touch the player API are probably misfiled.
        if !content.contains("mp.") && !content.contains("require") {
            findings.push(Finding::warning(
                "no player API usage found; file may not be a player plugin",
            ));
        }

        findings
    }
}

/// Checker for JavaScript plugin scripts.
pub struct PluginJsChecker;

impl FileChecker for PluginJsChecker {
    fn check(&self, path: &Path, _player: PlayerKind) -> Vec<Finding> {
        let mut findings = Vec::new();

        if path.extension().and_then(|e| e.to_str()) != Some("js") {
            findings.push(Finding::error("expected a .js file"));
        }

        let content = match read_text(path) {
            Ok(c) => c,
            Err(finding) => {
                findings.push(finding);
                return findings;
            }
        };

        if count_char(&content, '{') != count_char(&content, '}') {
            findings.push(Finding::error("unbalanced braces"));
        }
        if count_char(&content, '(') != count_char(&content, ')') {
            findings.push(Finding::error("unbalanced parentheses"));
        }

        if !content.contains("mp.") && !content.contains("require(") {
            findings.push(Finding::warning(
                "no player API usage found; file may not be a player plugin",
            ));
        }

        findings
    }
}

/// Checker for GLSL shader sources.
///
/// Shaders are treated as opaque beyond extension, keyword markers, and
/// delimiter balance, so findings are file-level only.
pub struct ShaderChecker;

impl FileChecker for ShaderChecker {
    fn check(&self, path: &Path, _player: PlayerKind) -> Vec<Finding> {
        let mut findings = Vec::new();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        if !matches!(ext.as_deref(), Some(e) if SHADER_EXTENSIONS.contains(&e)) {
            findings.push(Finding::error(format!(
                "invalid shader extension; expected one of: {}",
                SHADER_EXTENSIONS.join(", ")
            )));
            return findings;
        }

        let content = match read_text(path) {
            Ok(c) => c,
            Err(finding) => {
                findings.push(finding);
                return findings;
            }
        };

        let has_glsl_marker = ["void", "vec", "mat", "float", "uniform", "sampler"]
            .iter()
            .any(|kw| content.contains(kw));
        if !has_glsl_marker {
            findings.push(Finding::error(
                "no GLSL keywords found; file may not be a valid shader",
            ));
        }

        if count_char(&content, '{') != count_char(&content, '}') {
            findings.push(Finding::error("unbalanced braces"));
        }
        if count_char(&content, '(') != count_char(&content, ')') {
            findings.push(Finding::error("unbalanced parentheses"));
        }

        findings
    }
}

fn count_char(content: &str, c: char) -> usize {
    content.chars().filter(|&x| x == c).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Severity;
    use std::fs;
    use tempfile::TempDir;

    fn write(tmp: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = tmp.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_config_checker_accepts_valid_mpv_config() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "mpv.conf", "# comment\n\nvo=gpu\nprofile=gpu-hq\n");

        let findings = ConfigChecker.check(&path, PlayerKind::Mpv);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_config_checker_reports_line_numbers() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "mpv.conf", "vo=gpu\nthis is not an option\nhwdec=auto\n!!!\n");

        let findings = ConfigChecker.check(&path, PlayerKind::Mpv);
        let errors: Vec<_> = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .collect();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, Some(2));
        assert_eq!(errors[1].line, Some(4));
    }

    #[test]
    fn test_config_checker_warns_on_unknown_option() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "mpv.conf", "vo=gpu\nno-such-option=1\n");

        let findings = ConfigChecker.check(&path, PlayerKind::Mpv);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
        assert_eq!(findings[0].line, Some(2));
        assert!(findings[0].message.contains("no-such-option"));
    }

    #[test]
    fn test_config_checker_uses_player_option_set() {
        let tmp = TempDir::new().unwrap();
        // Known to VLC, unknown to mpv.
        let path = write(&tmp, "vlcrc", "deinterlace=1\n");

        assert!(ConfigChecker.check(&path, PlayerKind::Vlc).is_empty());
        assert_eq!(ConfigChecker.check(&path, PlayerKind::Mpv).len(), 1);
    }

    #[test]
    fn test_script_opt_checker_has_no_known_set() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "osc.conf", "anything-goes=yes\nbad line\n");

        let findings = ScriptOptChecker.check(&path, PlayerKind::Mpv);

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert_eq!(findings[0].line, Some(2));
    }

    #[test]
    fn test_lua_checker_extension() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "plugin.txt", "mp.observe_property()");

        let findings = PluginLuaChecker.check(&path, PlayerKind::Mpv);
        assert!(findings
            .iter()
            .any(|f| f.severity == Severity::Error && f.message.contains(".lua")));
    }

    #[test]
    fn test_lua_checker_warns_without_api_usage() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "plugin.lua", "print('hello')\n");

        let findings = PluginLuaChecker.check(&path, PlayerKind::Mpv);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    #[test]
    fn test_js_checker_unbalanced_braces() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "plugin.js", "mp.observe(function() {\n");

        let findings = PluginJsChecker.check(&path, PlayerKind::Mpv);
        assert!(findings.iter().any(|f| f.message.contains("braces")));
        assert!(findings.iter().any(|f| f.message.contains("parentheses")));
    }

    #[test]
    fn test_shader_checker_rejects_bad_extension() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "sharpen.hlsl", "void main() {}");

        let findings = ShaderChecker.check(&path, PlayerKind::Mpv);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("extension"));
    }

    #[test]
    fn test_shader_checker_accepts_plausible_glsl() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "sharpen.glsl",
            "//!HOOK LUMA\nvec4 hook() {\n    return vec4(0.0);\n}\n",
        );

        assert!(ShaderChecker.check(&path, PlayerKind::Mpv).is_empty());
    }

    #[test]
    fn test_shader_checker_flags_non_glsl_content() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "sharpen.glsl", "just some text\n");

        let findings = ShaderChecker.check(&path, PlayerKind::Mpv);
        assert!(findings
            .iter()
            .any(|f| f.message.contains("GLSL keywords")));
    }
}
