//! Number formatting for result tables.

/// Placeholder for missing values.
pub const MISSING: &str = "-";

/// Up to six decimals with trailing zeros removed. Non-finite values
/// are rendered as [`MISSING`].
pub fn format_number(x: f64) -> String {
    if !x.is_finite() {
        return MISSING.to_string();
    }
    let s = format!("{:.6}", x);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// P-value formatting: `0` and `1` at the bounds, scientific notation with
/// up to four mantissa decimals below `scientific_threshold`, otherwise
/// [`format_number`].
pub fn format_pvalue(p: f64, scientific_threshold: f64) -> String {
    if p.is_nan() {
        return MISSING.to_string();
    }
    if p <= 0.0 {
        return "0".to_string();
    }
    if p >= 1.0 {
        return "1".to_string();
    }
    if p < scientific_threshold {
        format_scientific(p)
    } else {
        format_number(p)
    }
}

/// Scientific notation like `1.2346E-8`.
pub fn format_scientific(x: f64) -> String {
    let s = format!("{:.4e}", x);
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let mantissa = if mantissa.contains('.') {
                mantissa.trim_end_matches('0').trim_end_matches('.')
            } else {
                mantissa
            };
            format!("{}E{}", mantissa, exp)
        }
        None => s,
    }
}

/// Format an optional value, using [`MISSING`] for `None`.
pub fn format_opt<T, F: Fn(T) -> String>(v: Option<T>, f: F) -> String {
    v.map(f).unwrap_or_else(|| MISSING.to_string())
}

/// Join per-dataset fields with `;`.
pub fn join_datasets<I: IntoIterator<Item = String>>(fields: I) -> String {
    fields.into_iter().collect::<Vec<_>>().join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(-0.0000001), "0");
        assert_eq!(format_number(1.23456789), "1.234568");
        assert_eq!(format_number(f64::NAN), "-");
        assert_eq!(format_number(-3.25), "-3.25");
    }

    #[test]
    fn test_format_pvalue() {
        assert_eq!(format_pvalue(0.0, 1e-5), "0");
        assert_eq!(format_pvalue(1.0, 1e-5), "1");
        assert_eq!(format_pvalue(0.05, 1e-5), "0.05");
        assert_eq!(format_pvalue(1.23456e-8, 1e-5), "1.2346E-8");
        assert_eq!(format_pvalue(2.0e-10, 1e-5), "2E-10");
        assert_eq!(format_pvalue(f64::NAN, 1e-5), "-");
    }

    #[test]
    fn test_join_and_opt() {
        assert_eq!(
            join_datasets(vec!["1".to_string(), MISSING.to_string()]),
            "1;-"
        );
        assert_eq!(format_opt(Some(3usize), |n| n.to_string()), "3");
        assert_eq!(format_opt(None::<usize>, |n| n.to_string()), "-");
    }
}
