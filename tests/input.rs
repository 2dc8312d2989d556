use assert_cmd::Command;

#[cfg(test)]
mod input {
    use super::Command;

    #[test]
    fn echo() {
        Command::cargo_bin("glint").unwrap()
            .arg("tests/fixtures/input/echo.glint")
            .write_stdin("world\n")
            .assert()
            .stdout("hello world\n")
            .success();
    }

    #[test]
    fn trims_trailing_newline() {
        Command::cargo_bin("glint").unwrap()
            .arg("tests/fixtures/input/trims_newline.glint")
            .write_stdin("Ada\n")
            .assert()
            .stdout("true\n")
            .success();
    }

    #[test]
    fn trims_trailing_carriage_return() {
        Command::cargo_bin("glint").unwrap()
            .arg("tests/fixtures/input/trims_newline.glint")
            .write_stdin("Ada\r\n")
            .assert()
            .stdout("true\n")
            .success();
    }
}
