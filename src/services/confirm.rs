/// Asks the user a yes/no question and waits for the answer.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

/// Answers yes without asking.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _message: &str) -> bool {
        true
    }
}

impl<C: Confirm + ?Sized> Confirm for Box<C> {
    fn confirm(&mut self, message: &str) -> bool {
        (**self).confirm(message)
    }
}
