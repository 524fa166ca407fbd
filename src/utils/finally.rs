/// Runs `func` with `arg` when the returned guard goes out of scope, on every exit
/// path including early returns. Call `forget` to disarm it.
pub fn finally<A, F>(arg: A, func: F) -> FinallyGuard<A, F>
where
    F: FnMut(&mut A),
{
    FinallyGuard {
        arg: Some(arg),
        func,
    }
}

pub struct FinallyGuard<A, F>
where
    F: FnMut(&mut A),
{
    arg: Option<A>,
    func: F,
}

impl<A, F> FinallyGuard<A, F>
where
    F: FnMut(&mut A),
{
    /// Disarms the guard and hands back the argument.
    pub fn forget(mut self) -> A {
        match self.arg.take() {
            Some(arg) => arg,
            None => unreachable!(),
        }
    }
}

impl<A, F> Drop for FinallyGuard<A, F>
where
    F: FnMut(&mut A),
{
    fn drop(&mut self) {
        if let Some(ref mut arg) = self.arg {
            (self.func)(arg)
        }
    }
}
