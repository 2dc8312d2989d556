#[macro_use]
mod common;

#[cfg(test)]
mod class {
    tests! {
        method in class is OK
        "Crunch"
    }
}
