#[macro_use]
mod common;

#[cfg(test)]
mod constructor {
    tests! {
        init_returns_this in constructor is OK
        "true"
        "C instance"
    }
}
