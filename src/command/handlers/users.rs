//! User account commands

use colored::Colorize;

use crate::command::{Command, Context, Outcome};
use crate::error::Result;
use crate::managers::Users;

/// `adduser <name> <password>` — idempotent by name; a repeat add
/// leaves the existing password untouched.
pub struct AddUserCommand;

impl Command for AddUserCommand {
    fn name(&self) -> &'static str {
        "adduser"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (2, 2)
    }

    fn usage(&self) -> &'static str {
        "adduser <name> <password>"
    }

    fn summary(&self) -> &'static str {
        "Add a user account"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let user = Users::new(&ctx.db).add(&args[0], &args[1])?;
        println!("Added user {}", user.name.green());
        Ok(Outcome::Done)
    }
}

pub struct DeleteUserCommand;

impl Command for DeleteUserCommand {
    fn name(&self) -> &'static str {
        "deleteuser"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (1, 1)
    }

    fn usage(&self) -> &'static str {
        "deleteuser <name>"
    }

    fn summary(&self) -> &'static str {
        "Delete a user account"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        Users::new(&ctx.db).delete(&args[0])?;
        println!("Deleted user {}", args[0].green());
        Ok(Outcome::Done)
    }
}

pub struct SetPasswordCommand;

impl Command for SetPasswordCommand {
    fn name(&self) -> &'static str {
        "setpassword"
    }

    fn arg_bounds(&self) -> (usize, usize) {
        (2, 2)
    }

    fn usage(&self) -> &'static str {
        "setpassword <name> <password>"
    }

    fn summary(&self) -> &'static str {
        "Change a user's password"
    }

    fn run(&self, ctx: &mut Context, args: &[String]) -> Result<Outcome> {
        let user = Users::new(&ctx.db).set_password(&args[0], &args[1])?;
        println!("Password changed for {}", user.name.green());
        Ok(Outcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{dispatch, CommandHistory, Mode, Registry};
    use crate::config::Config;
    use crate::db::Database;
    use crate::error::Error;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let history = CommandHistory::open(dir.path().join("history.txt")).unwrap();
        let ctx = Context {
            db: Database::open_memory().unwrap(),
            config: Config::default(),
            history,
            mode: Mode::CommandLine,
        };
        (dir, ctx)
    }

    #[test]
    fn test_adduser_and_setpassword() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "adduser alex hunter2")?;
        assert!(Users::new(&ctx.db).authenticate("Alex", "hunter2")?);

        dispatch(&registry, &mut ctx, "setpassword alex swordfish")?;
        assert!(Users::new(&ctx.db).authenticate("Alex", "swordfish")?);
        assert!(!Users::new(&ctx.db).authenticate("Alex", "hunter2")?);

        Ok(())
    }

    #[test]
    fn test_deleteuser() -> Result<()> {
        let registry = Registry::standard();
        let (_dir, mut ctx) = context();

        dispatch(&registry, &mut ctx, "adduser alex hunter2")?;
        dispatch(&registry, &mut ctx, "deleteuser alex")?;
        assert!(Users::new(&ctx.db).get_by_name("Alex")?.is_none());

        let result = dispatch(&registry, &mut ctx, "deleteuser alex");
        assert!(matches!(result, Err(Error::NotFound { .. })));

        Ok(())
    }
}
