use oakcan::ApiError;

use super::*;

#[test]
fn cookies_split_on_semicolon() {
    let cli = Cli::try_parse_from(["oakcan", "--cookie", "XSRF-TOKEN=a; SESSION=b", "whoami"]).unwrap();
    assert_eq!(cli.cookies.len(), 2);
    assert_eq!(cli.cookies[1].trim(), "SESSION=b");
}

#[test]
fn ls_folder_is_optional() {
    let cli = Cli::try_parse_from(["oakcan", "ls"]).unwrap();
    assert!(matches!(cli.command, Command::Ls { folder_id: None, password: None }));

    let cli = Cli::try_parse_from(["oakcan", "ls", "abc", "--password", "pw"]).unwrap();
    assert!(matches!(cli.command, Command::Ls { folder_id: Some(_), password: Some(_) }));
}

#[test]
fn login_requires_credentials() {
    assert!(Cli::try_parse_from(["oakcan", "login", "--email", "jane@oakcan.test"]).is_err());
}

#[test]
fn rejected_login_names_field() {
    let api = ApiError::from_body(401, r#"{"errorCode":"AUTH-01","details":"Invalid credentials"}"#);
    let err = CliError::from_form(FormKind::Login, ClientError::Api(api));
    assert_eq!(err.to_string(), "password: Invalid credentials");
}

#[test]
fn unknown_code_becomes_banner() {
    let api = ApiError::from_body(500, r#"{"errorCode":"SYS-01"}"#);
    let err = CliError::from_form(FormKind::Register, ClientError::Api(api));
    assert_eq!(err.to_string(), "Registration failed. Please try again.");
}

#[test]
fn non_api_errors_pass_through() {
    let err = CliError::from_form(FormKind::Login, ClientError::NoPendingVerification);
    assert!(matches!(err, CliError::Client(ClientError::NoPendingVerification)));
}
