//! `printf`-style formatting: `%s %d %x %n %%`, with `-` (left-justify)
//! and `0` (zero-pad) flags and a minimum width.

use super::interpreter::Value;

/// Widest padding a specifier may ask for.
const MAX_WIDTH: usize = 4096;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    left: bool,
    zero: bool,
    width: usize,
}

impl Spec {
    fn pad(self, text: String) -> String {
        let len = text.chars().count();
        if len >= self.width {
            return text;
        }
        let fill = self.width - len;
        if self.left {
            format!("{}{}", text, " ".repeat(fill))
        } else if self.zero {
            match text.strip_prefix('-') {
                Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
                None => format!("{}{}", "0".repeat(fill), text),
            }
        } else {
            format!("{}{}", " ".repeat(fill), text)
        }
    }
}

/// Formats `args` according to `fmt`. `display` renders values for `%s`.
/// Surplus arguments are ignored.
pub fn format(fmt: &str, args: &[Value], display: &dyn Fn(&Value) -> String) -> Result<String, String> {
    let mut out = String::with_capacity(fmt.len());
    let mut args = args.iter();
    let mut chars = fmt.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }

        let mut spec = Spec::default();
        loop {
            match chars.peek() {
                Some('-') => spec.left = true,
                Some('0') if !spec.zero => spec.zero = true,
                _ => break,
            }
            chars.next();
        }
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            spec.width = spec
                .width
                .checked_mul(10)
                .and_then(|w| w.checked_add(d as usize))
                .filter(|w| *w <= MAX_WIDTH)
                .ok_or("format width too large")?;
            chars.next();
        }
        let conversion = chars.next().ok_or("incomplete format specifier at end of format")?;

        if spec.left && spec.zero {
            return Err(format!("flags `-` and `0` cannot be combined in `%{}`", conversion));
        }
        if (spec.left || spec.zero) && spec.width == 0 {
            return Err(format!("flag in `%{}` needs a width", conversion));
        }

        match conversion {
            '%' => out.push('%'),
            'n' => out.push('\n'),
            's' | 'd' | 'x' => {
                let arg = args
                    .next()
                    .ok_or_else(|| format!("missing argument for `%{}`", conversion))?;
                let text = match (conversion, arg) {
                    ('s', _) if spec.zero => {
                        return Err("flag `0` needs a numeric conversion".to_string());
                    }
                    ('s', value) => display(value),
                    ('d', Value::Int(v)) => v.to_string(),
                    ('x', Value::Int(v)) => format!("{:x}", v),
                    (c, other) => {
                        return Err(format!("`%{}` needs an integer, found {}", c, other.type_name()));
                    }
                };
                out.push_str(&spec.pad(text));
            }
            other => return Err(format!("unknown conversion `%{}`", other)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(value: &Value) -> String {
        match value {
            Value::Str(s) => s.clone(),
            other => format!("{:?}", other),
        }
    }

    fn fmt(f: &str, args: &[Value]) -> Result<String, String> {
        format(f, args, &show)
    }

    #[test]
    fn test_conversions_and_padding() {
        let args = [Value::Str("run".into()), Value::Int(42), Value::Int(255), Value::Int(-7)];
        assert_eq!(
            fmt("[%-5s|%5d|%x|%04d]%n100%%", &args).unwrap(),
            "[run  |   42|ff|-007]\n100%"
        );
    }

    #[test]
    fn test_argument_errors() {
        assert!(fmt("%s %s", &[Value::Int(1)]).unwrap_err().contains("missing argument"));
        assert!(fmt("%d", &[Value::Str("x".into())]).unwrap_err().contains("needs an integer"));
        assert!(fmt("%q", &[]).unwrap_err().contains("unknown conversion"));
        assert!(fmt("50%", &[]).unwrap_err().contains("incomplete"));
        assert!(fmt("%-05d", &[Value::Int(1)]).is_err());
        assert!(fmt("%-d", &[Value::Int(1)]).is_err());
        assert_eq!(fmt("%s", &[Value::Int(1), Value::Int(2)]).unwrap(), "Int(1)");
    }

    #[test]
    fn test_width_is_bounded() {
        assert_eq!(fmt("%99999999999999999999d", &[Value::Int(1)]).unwrap_err(), "format width too large");
        assert_eq!(fmt("%4097s", &[Value::Str("x".into())]).unwrap_err(), "format width too large");
        let widest = fmt("%04096d", &[Value::Int(7)]).unwrap();
        assert_eq!(widest.len(), 4096);
        assert!(widest.ends_with("007"));
    }
}
