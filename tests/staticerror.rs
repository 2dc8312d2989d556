#[macro_use]
mod common;

#[cfg(test)]
mod staticerror {
    tests! {
        return_top_level in staticerror is ERR
        "[line 1] Error at 'return': Can't return from top-level code."
    }
}
