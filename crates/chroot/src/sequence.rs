use crate::command::{Execute, Request};

/// Runs each command in order, stopping at the first one that fails.
///
/// Returns `true` only when every command succeeded. Nothing is retried.
pub fn run_all<E: Execute + ?Sized>(executor: &mut E, commands: &[Request]) -> bool {
    for (id, request) in commands.iter().enumerate() {
        let result = executor.run(request);
        if !result.succeeded {
            error!(
                "command {} of {} failed{}: {}",
                id + 1,
                commands.len(),
                if request.chroot { " in chroot" } else { "" },
                request.command
            );
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandResult, Failure};

    struct Scripted {
        fail_on: Option<usize>,
        ran:     Vec<Request>,
    }

    impl Execute for Scripted {
        fn run(&mut self, request: &Request) -> CommandResult {
            self.ran.push(request.clone());
            if Some(self.ran.len() - 1) == self.fail_on {
                CommandResult::failed(Failure::Status(1), Vec::new())
            } else {
                CommandResult::success(Vec::new())
            }
        }
    }

    fn commands() -> Vec<Request> {
        vec![
            Request::new("mount /dev/vg0/root /mnt"),
            Request::new("mkdir -p /mnt/boot/efi"),
            Request::chroot("locale-gen"),
        ]
    }

    #[test]
    fn runs_everything_in_order() {
        let mut executor = Scripted { fail_on: None, ran: Vec::new() };
        assert!(run_all(&mut executor, &commands()));
        assert_eq!(executor.ran, commands());
    }

    #[test]
    fn stops_at_first_failure() {
        let mut executor = Scripted { fail_on: Some(1), ran: Vec::new() };
        assert!(!run_all(&mut executor, &commands()));
        assert_eq!(executor.ran, &commands()[..2]);
    }

    #[test]
    fn empty_sequence_succeeds() {
        let mut executor = Scripted { fail_on: Some(0), ran: Vec::new() };
        assert!(run_all(&mut executor, &[]));
        assert!(executor.ran.is_empty());
    }
}
