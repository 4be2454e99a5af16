use crate::utils::Result;

pub fn create_writer<T, F>(output_prefix: &str, output_suffix: &str, f: F) -> Result<T>
where
    F: FnOnce(&str) -> Result<T>,
{
    let output_path = format!("{}.{}", output_prefix, output_suffix);
    log::debug!("Writing {}", output_path);
    f(&output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_writer_joins_prefix_and_suffix() {
        let path = create_writer("out/run1", "stats.csv", |path| Ok(path.to_string())).unwrap();
        assert_eq!(path, "out/run1.stats.csv");
    }

    #[test]
    fn create_writer_propagates_error() {
        let result: Result<()> = create_writer("run", "csv", |_| Err("disk full".to_string()));
        assert_eq!(result, Err("disk full".to_string()));
    }
}
