use stepwise_core::ToolError;

#[test]
fn tool_error_is_displayable() {
    let err = ToolError::InvalidInput("missing field".to_string());
    assert_eq!(err.to_string(), "invalid input: missing field");
}

#[test]
fn io_errors_convert_into_tool_errors() {
    fn read() -> Result<String, ToolError> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))?
    }

    let err = read().unwrap_err();
    assert!(matches!(err, ToolError::Io(_)));
    assert!(err.to_string().contains("no such file"));
}
