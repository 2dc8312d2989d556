#[macro_use]
mod common;

#[cfg(test)]
mod arithmetic {
    tests! {
        addition in arithmetic is OK
        "3"
    }
}
