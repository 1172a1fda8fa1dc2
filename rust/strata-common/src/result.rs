pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_capacity(capacity: usize) -> Result<usize> {
        verify_arg!(capacity, capacity <= 16);
        Ok(capacity)
    }

    #[test]
    fn test_verify_arg_macro() {
        assert_eq!(check_capacity(8).unwrap(), 8);
        let err = check_capacity(17).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid argument capacity: capacity <= 16"
        );
    }
}
