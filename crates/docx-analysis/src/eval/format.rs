//! Python string formatting: format specs and `str.format`.
//!
//! Covers the subset seen in error messages. Anything else returns `None`
//! and the caller reports it as unsupported.

use super::value::{float_repr, Value, MAX_STRING_LEN};

#[derive(Debug, Default)]
struct Spec {
    fill: Option<char>,
    align: Option<char>,
    sign: Option<char>,
    zero: bool,
    width: usize,
    grouping: bool,
    precision: Option<usize>,
    kind: Option<char>,
}

fn parse_spec(spec: &str) -> Option<Spec> {
    let chars: Vec<char> = spec.chars().collect();
    let mut i = 0;
    let mut out = Spec::default();
    let is_align = |c: char| matches!(c, '<' | '>' | '^' | '=');
    if chars.len() >= 2 && is_align(chars[1]) {
        out.fill = Some(chars[0]);
        out.align = Some(chars[1]);
        i = 2;
    } else if chars.first().is_some_and(|c| is_align(*c)) {
        out.align = Some(chars[0]);
        i = 1;
    }
    if let Some(c @ ('+' | '-' | ' ')) = chars.get(i).copied() {
        out.sign = Some(c);
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        out.zero = true;
        i += 1;
    }
    let start = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    if i > start {
        out.width = chars[start..i].iter().collect::<String>().parse().ok()?;
    }
    if chars.get(i) == Some(&',') {
        out.grouping = true;
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        out.precision = Some(chars[start..i].iter().collect::<String>().parse().ok()?);
    }
    if let Some(c) = chars.get(i).copied() {
        out.kind = Some(c);
        i += 1;
    }
    if out.width > MAX_STRING_LEN || out.precision.is_some_and(|p| p > MAX_STRING_LEN) {
        return None;
    }
    (i == chars.len()).then_some(out)
}

fn group_thousands(digits: &str) -> String {
    let (int_part, rest) = match digits.find('.') {
        Some(dot) => digits.split_at(dot),
        None => (digits, ""),
    };
    let mut grouped = String::new();
    for (n, c) in int_part.chars().enumerate() {
        if n > 0 && (int_part.len() - n) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped.push_str(rest);
    grouped
}

/// Render `value` with a format spec, as `format(value, spec)` would.
pub fn apply_format_spec(value: &Value, spec: &str) -> Option<String> {
    if spec.is_empty() {
        return Some(value.py_str());
    }
    let spec = parse_spec(spec)?;
    let (negative, body, numeric) = match (spec.kind, value) {
        (None | Some('s'), Value::Str(s)) => {
            let s = match spec.precision {
                Some(p) => s.chars().take(p).collect(),
                None => s.clone(),
            };
            (false, s, false)
        }
        (None | Some('d'), Value::Int(i)) => (*i < 0, i.unsigned_abs().to_string(), true),
        (Some('x'), Value::Int(i)) => (*i < 0, format!("{:x}", i.unsigned_abs()), true),
        (Some('X'), Value::Int(i)) => (*i < 0, format!("{:X}", i.unsigned_abs()), true),
        (Some('o'), Value::Int(i)) => (*i < 0, format!("{:o}", i.unsigned_abs()), true),
        (Some('b'), Value::Int(i)) => (*i < 0, format!("{:b}", i.unsigned_abs()), true),
        (Some('f' | 'F' | '%'), Value::Int(_) | Value::Float(_)) => {
            let mut f = match value {
                Value::Int(i) => *i as f64,
                Value::Float(f) => *f,
                _ => return None,
            };
            if spec.kind == Some('%') {
                f *= 100.0;
            }
            let precision = spec.precision.unwrap_or(6);
            let mut body = format!("{:.*}", precision, f.abs());
            if spec.kind == Some('%') {
                body.push('%');
            }
            (f < 0.0, body, true)
        }
        (None, Value::Float(f)) => {
            let body = match spec.precision {
                Some(p) => format!("{:.*}", p, f.abs()),
                None => float_repr(f.abs()),
            };
            (*f < 0.0, body, true)
        }
        (None, Value::Bool(_) | Value::None) if spec.precision.is_none() => {
            (false, value.py_str(), false)
        }
        _ => return None,
    };

    let body = if spec.grouping && numeric {
        group_thousands(&body)
    } else {
        body
    };
    let sign = match (negative, spec.sign) {
        (true, _) => "-",
        (false, Some('+')) if numeric => "+",
        (false, Some(' ')) if numeric => " ",
        _ => "",
    };

    let len = sign.chars().count() + body.chars().count();
    if len >= spec.width {
        return Some(format!("{sign}{body}"));
    }
    let pad = spec.width - len;
    let (fill, align) = if spec.zero && spec.align.is_none() && numeric {
        ('0', '=')
    } else {
        (
            spec.fill.unwrap_or(' '),
            spec.align.unwrap_or(if numeric { '>' } else { '<' }),
        )
    };
    let padding = |n: usize| fill.to_string().repeat(n);
    Some(match align {
        '<' => format!("{sign}{body}{}", padding(pad)),
        '^' => format!("{}{sign}{body}{}", padding(pad / 2), padding(pad - pad / 2)),
        '=' => format!("{sign}{}{body}", padding(pad)),
        _ => format!("{}{sign}{body}", padding(pad)),
    })
}

/// `template.format(*args, **kwargs)`.
pub fn str_format(template: &str, args: &[Value], kwargs: &[(String, Value)]) -> Option<String> {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    let mut auto_index = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        c => field.push(c),
                    }
                }
                let (name_conv, spec) = match field.split_once(':') {
                    Some((head, spec)) => (head, spec),
                    None => (field.as_str(), ""),
                };
                let (name, conversion) = match name_conv.split_once('!') {
                    Some((name, conv)) => (name, Some(conv)),
                    None => (name_conv, None),
                };
                let value = if name.is_empty() {
                    let v = args.get(auto_index)?;
                    auto_index += 1;
                    v
                } else if let Ok(index) = name.parse::<usize>() {
                    args.get(index)?
                } else {
                    kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)?
                };
                let value = match conversion {
                    None | Some("s") => value.clone(),
                    Some("r") => Value::Str(value.py_repr()),
                    Some(_) => return None,
                };
                out.push_str(&apply_format_spec(&value, spec)?);
            }
            '}' => return None,
            c => out.push(c),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_specs() {
        assert_eq!(apply_format_spec(&Value::Int(7), "03d").unwrap(), "007");
        assert_eq!(apply_format_spec(&Value::Int(1234567), ",").unwrap(), "1,234,567");
        assert_eq!(apply_format_spec(&Value::Float(0.5), ".1%").unwrap(), "50.0%");
        assert_eq!(apply_format_spec(&Value::Str("ab".into()), ">4").unwrap(), "  ab");
        assert_eq!(apply_format_spec(&Value::Str("ab".into()), "*^6").unwrap(), "**ab**");
        assert_eq!(apply_format_spec(&Value::Float(-2.0), ".2f").unwrap(), "-2.00");
        assert!(apply_format_spec(&Value::Str("x".into()), "d").is_none());
    }

    #[test]
    fn oversized_padding_is_refused() {
        assert!(apply_format_spec(&Value::Str("x".into()), ">999999999999").is_none());
        assert!(apply_format_spec(&Value::Float(1.0), ".99999999f").is_none());
        assert_eq!(
            apply_format_spec(&Value::Int(1), &format!(">{MAX_STRING_LEN}")).map(|s| s.len()),
            Some(MAX_STRING_LEN)
        );
    }

    #[test]
    fn str_format_fields() {
        let args = [Value::Str("user".into()), Value::Int(3)];
        let kwargs = [("id".to_string(), Value::Int(9))];
        assert_eq!(
            str_format("{} #{} ({id:02d}) {{ok}}", &args, &kwargs).unwrap(),
            "user #3 (09) {ok}"
        );
        assert_eq!(str_format("{1}-{0!r}", &args, &[]).unwrap(), "3-'user'");
        assert!(str_format("{missing}", &args, &[]).is_none());
    }
}
