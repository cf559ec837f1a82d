use std::path::Path;

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Page shown in place of the player when its shell cannot be served.
pub(super) fn build_error_page(scene_path: &Path, error: &str) -> String {
    let escaped = html_escape(error);
    let scene = html_escape(&scene_path.display().to_string());
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>jsgen preview: error</title>
<style>
  * {{ margin: 0; padding: 0; box-sizing: border-box; }}
  html, body {{ width: 100%; height: 100%; background: #0A0A0A; color: #A0A0A0;
    font-family: 'JetBrains Mono', monospace; }}
  .error-container {{
    max-width: 640px; margin: 80px auto; padding: 32px;
    border: 1px solid #3F1818; border-radius: 8px;
  }}
  .error-header {{ margin-bottom: 20px; font-size: 13px; color: #EF4444; }}
  .error-header .scene {{ color: #D4AF37; }}
  .error-message {{
    font-size: 12px; color: #EF4444; line-height: 1.7;
    white-space: pre-wrap; word-break: break-word;
    padding: 16px; background: #141414; border-radius: 4px;
    border-left: 3px solid #EF4444;
  }}
  .hint {{ margin-top: 24px; font-size: 11px; color: #666; }}
</style>
</head>
<body>
<div class="error-container">
  <div class="error-header">player unavailable for <span class="scene">{scene}</span></div>
  <div class="error-message">{escaped}</div>
  <div class="hint">Waiting for player assets, the page reloads on change.</div>
</div>
</body>
</html>"##
    )
}
