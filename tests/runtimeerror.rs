#[macro_use]
mod common;

#[cfg(test)]
mod runtimeerror {
    tests! {
        string_plus_number in runtimeerror is ERR
        "Operands must be two strings or two numbers."
        "[line 1]"
    }
}
