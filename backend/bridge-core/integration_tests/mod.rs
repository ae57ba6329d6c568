mod bridge_tests {
    pub mod helpers;
    mod window;
    mod worker;
}

mod error {
    mod call;
    mod channel;
}
