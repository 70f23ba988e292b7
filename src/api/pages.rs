pub const LOGIN_FORM: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <h1>Login</h1>
    <form method="POST" action="/login">
      <label for="username">Username:</label><br/>
      <input type="text" id="username" name="username" /><br/><br/>
      <label for="password">Password:</label><br/>
      <input type="password" id="password" name="password" /><br/><br/>
      <button type="submit">Login</button>
    </form>
  </body>
</html>
"#;

pub const LOGIN_FAILED: &str = "<h2>Login failed</h2>";

pub const INTERNAL_ERROR: &str = "Internal Server Error";

#[must_use]
pub fn welcome(username: &str) -> String {
    format!(
        "<h2>Login successful</h2><p>Welcome {}</p>",
        escape_html(username)
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}
