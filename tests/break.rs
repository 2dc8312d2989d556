#[macro_use]
mod common;

#[cfg(test)]
mod _break {
    tests! {
        inside_while in break is OK
        "0"
        "1"
        "2"
    }

    tests! {
        inside_for in break is OK
        "0"
        "1"
        "2"
    }

    tests! {
        nested in break is OK
        "inside"
        "inside"
        "outside"
    }

    tests! {
        no_loop in break is ERR
        "[line 1] Error at 'break': Can't break outside of a loop."
    }

    // A function literal starts a fresh loop-nesting context, so a `break`
    // inside its body is a static error even though the function is itself
    // declared lexically inside a loop (see parser.rs's `function`).
    tests! {
        in_function in break is ERR
        "[line 3] Error at 'break': Can't break outside of a loop."
    }
}
