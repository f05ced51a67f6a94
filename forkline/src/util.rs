//! Shared helpers.

fn find_value_end(s: &str) -> usize {
    let mut end = 0;
    let mut in_quote = None;
    let mut escaped = false;

    for c in s.chars() {
        let char_len = c.len_utf8();

        if escaped {
            escaped = false;
            end += char_len;
            continue;
        }

        if c == '\\' {
            escaped = true;
            end += char_len;
            continue;
        }

        if let Some(q) = in_quote {
            if c == q {
                in_quote = None;
            }
            end += char_len;
            continue;
        }

        if c == '"' || c == '\'' {
            in_quote = Some(c);
            end += char_len;
            continue;
        }

        if c.is_whitespace() {
            break;
        }

        end += char_len;
    }
    end
}

/// Key prefixes whose values never reach a log line.
///
/// JVM argument lines routinely carry keystore passwords, repository
/// credentials and tokens as system properties.
const SENSITIVE_PATTERNS: &[&str] = &[
    "Password=",
    "password=",
    "PASSWORD=",
    "passphrase=",
    "secret=",
    "Secret=",
    "SECRET=",
    "token=",
    "Token=",
    "TOKEN=",
    "apiKey=",
    "api.key=",
    "API_KEY=",
    "AWS_SECRET_ACCESS_KEY=",
    "GITHUB_TOKEN=",
];

const MASK: &str = "***";

/// Mask sensitive values in a command line before logging it.
pub fn mask_sensitive_command(cmd: &str) -> String {
    let mut result = cmd.to_string();
    for pattern in SENSITIVE_PATTERNS {
        let mut search_start = 0;
        while search_start < result.len() {
            let Some(start) = result[search_start..].find(pattern) else {
                break;
            };
            let value_start = search_start + start + pattern.len();
            let value_end = value_start + find_value_end(&result[value_start..]);

            if result[value_start..value_end] != *MASK {
                result.replace_range(value_start..value_end, MASK);
            }

            // Skip the mask so the same occurrence is not matched again.
            search_start = value_start + MASK.len();
        }
    }
    result
}
