#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_image()
            || cmd.is_audio()
            || cmd.is_cancel()
            || cmd.is_new_session()
            || cmd.is_rename_session()
            || cmd.is_list_sessions()
        {
            return Some(cmd);
        }

        return None;
    }

    /// Arguments joined back together, so paths and titles may contain
    /// spaces.
    pub fn arg_text(&self) -> String {
        return self.args.join(" ");
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_image(&self) -> bool {
        return ["/i", "/image"].contains(&self.command.as_str());
    }

    pub fn is_audio(&self) -> bool {
        return ["/au", "/audio"].contains(&self.command.as_str());
    }

    pub fn is_cancel(&self) -> bool {
        return ["/c", "/cancel"].contains(&self.command.as_str());
    }

    pub fn is_new_session(&self) -> bool {
        return ["/n", "/new"].contains(&self.command.as_str());
    }

    pub fn is_rename_session(&self) -> bool {
        return ["/t", "/title"].contains(&self.command.as_str());
    }

    pub fn is_list_sessions(&self) -> bool {
        return ["/s", "/sessions"].contains(&self.command.as_str());
    }
}
