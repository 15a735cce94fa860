use pmtconv::{
    ByteStringPolicy, ConfigError, ConvertError, Converter, ConverterConfig, Native, NativeArray,
};

#[test]
fn save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("convert.toml");

    let config = ConverterConfig {
        byte_strings: ByteStringPolicy::Reject,
        max_uniform_len: Some(4096),
        max_depth: 32,
    };
    config.save_to_toml(&path).unwrap();

    let loaded = ConverterConfig::load_from_toml(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn unbounded_length_is_omitted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("convert.toml");
    ConverterConfig::default().save_to_toml(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("max_uniform_len"));
    assert!(text.contains("byte_strings = \"symbol\""));
}

#[test]
fn malformed_file_names_its_origin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("convert.toml");
    std::fs::write(&path, "max_depth = \"deep\"\n").unwrap();

    match ConverterConfig::load_from_toml(&path) {
        Err(ConfigError::ParseError { file, .. }) => assert!(file.ends_with("convert.toml")),
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConverterConfig::load_from_toml(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

#[test]
fn loaded_limits_drive_the_converter() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("convert.toml");
    std::fs::write(&path, "max_uniform_len = 2\n").unwrap();

    let conv = Converter::builder()
        .config(ConverterConfig::load_from_toml(&path).unwrap())
        .build();
    let small = Native::Array(NativeArray::from_vec(vec![1u8, 2]));
    let large = Native::Array(NativeArray::from_vec(vec![1u8, 2, 3]));
    assert!(conv.from_native(&small).is_ok());
    assert!(matches!(
        conv.from_native(&large),
        Err(ConvertError::LengthLimit { len: 3, max: 2 })
    ));
}
