#[macro_export]
macro_rules! tests {
    ($file:ident in $scope:ident is OK $($expected:expr)*) => {
        #[test]
        fn $file() {
            use glint_lang::Glint;

            let mut expected = vec![$($expected),*];

            let expected = match expected.len() {
                0 => "".to_string(),
                _ => {
                    expected.push("");
                    expected.join("\n")
                }
            };

            let mut output = Vec::new();
            let mut glint = Glint::new(&mut output);

            glint.run_file(&format!("tests/fixtures/{}/{}.glint", stringify!($scope), stringify!($file)));

            // drop before reading `output` so the borrow from `Glint::new` ends
            drop(glint);
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };

    ($file:ident in $scope:ident is ERR $($expected:expr)+) => {
        #[test]
        fn $file() {
            use assert_cmd::Command;

            let output = vec![$($expected),+].join("\n");
            let file = format!("tests/fixtures/{}/{}.glint", stringify!($scope), stringify!($file));

            Command::cargo_bin("glint").unwrap()
                .arg(file)
                .assert()
                .stderr(format!("{output}\n"))
                .failure();
        }
    };
}
