use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
/// A complex number, stored as a real and an imaginary part.
///
/// `Complex<f32>` and `Complex<f64>` are the two supported widths.
///
/// # Textual representation
///
/// Complex numbers are printed as `(re±imi)`, e.g. `(1.5-2i)`.
/// When parsing, the parentheses are optional and either part can be omitted:
/// `3`, `2i`, `-i`, `1e3+2.5i` and `(1+2i)` are all valid inputs.
pub struct Complex<F> {
    pub re: F,
    pub im: F,
}

impl<F> Complex<F> {
    pub const fn new(re: F, im: F) -> Self {
        Self { re, im }
    }
}

/// The floating point types that can be used as parts of a [`Complex`] number.
pub trait ComplexPart: Copy + FromStr + fmt::Display + sealed::Sealed {
    #[doc(hidden)]
    const ZERO: Self;
    #[doc(hidden)]
    const ONE: Self;
    #[doc(hidden)]
    const MINUS_ONE: Self;
    #[doc(hidden)]
    fn writes_own_sign(self) -> bool;
}

macro_rules! complex_part {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}

            impl ComplexPart for $ty {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;
                const MINUS_ONE: Self = -1.0;

                fn writes_own_sign(self) -> bool {
                    self.is_sign_negative() && !self.is_nan()
                }
            }
        )*
    };
}

complex_part!(f32, f64);

mod sealed {
    pub trait Sealed {}
}

impl<F: ComplexPart> fmt::Display for Complex<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.im.writes_own_sign() { "" } else { "+" };
        write!(f, "({}{sign}{}i)", self.re, self.im)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{input}` is not a valid complex number")]
#[non_exhaustive]
/// The input couldn't be parsed as a [`Complex`] number.
pub struct ParseComplexError {
    /// The rejected input.
    pub input: String,
}

impl<F: ComplexPart> FromStr for Complex<F> {
    type Err = ParseComplexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseComplexError {
            input: s.to_owned(),
        };
        let body = s
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(s);
        if body.is_empty() {
            return Err(invalid());
        }

        let Some(body) = body.strip_suffix('i') else {
            let re = body.parse::<F>().map_err(|_| invalid())?;
            return Ok(Self::new(re, F::ZERO));
        };

        // The sign that separates the two parts is the last one that doesn't belong
        // to an exponent.
        let bytes = body.as_bytes();
        let split = bytes
            .iter()
            .enumerate()
            .rev()
            .find(|&(i, &b)| {
                i > 0 && (b == b'+' || b == b'-') && !matches!(bytes[i - 1], b'e' | b'E')
            })
            .map(|(i, _)| i);
        let (re, im) = match split {
            Some(i) => (&body[..i], &body[i..]),
            None => ("", body),
        };

        let re = if re.is_empty() {
            F::ZERO
        } else {
            re.parse::<F>().map_err(|_| invalid())?
        };
        let im = match im {
            "" | "+" => F::ONE,
            "-" => F::MINUS_ONE,
            im => im.parse::<F>().map_err(|_| invalid())?,
        };
        Ok(Self::new(re, im))
    }
}
