#[macro_use]
mod common;

#[cfg(test)]
mod forloop {
    tests! {
        desugars_to_while in forloop is OK
        "0"
        "1"
        "2"
    }
}
